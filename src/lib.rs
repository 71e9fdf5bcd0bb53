//! # SerialScope: serial key/value telemetry core
//!
//! The acquisition core of a serial telemetry visualizer. A device streams
//! line-delimited `KEY:VALUE` updates (plus `OK` heartbeats) over a serial
//! link; this crate validates and parses the stream and exposes it to
//! consumers — plots, loggers, indicators — as bounded per-signal
//! time-series.
//!
//! ## Architecture
//!
//! - **Transport** ([`transport`]): byte-stream device behind a trait, with
//!   a real serial implementation and a scriptable mock
//! - **Protocol** ([`protocol`]): line framing and the two-decimal wire
//!   codec
//! - **Link** ([`link`]): reader thread, connection lifecycle, heartbeat
//!   tracking, and fan-out dispatch to subscribers
//! - **Store** ([`store`]): bounded per-signal history with O(1) append and
//!   latest-value lookup
//! - **Logger** ([`logger`]): CSV logging state machine and file replay
//! - **Catalog/Layout/Config** ([`signals`], [`layout`], [`config`]): the
//!   external JSON formats the core consumes
//!
//! Data flows `Transport → reader thread → codec → dispatch hub →
//! {store, subscribers}`. The logger samples the store on an external tick;
//! it is not a hub subscriber.
//!
//! The crate is a library by design: connection control, tick timers, and
//! all presentation belong to the embedding shell.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use serialscope::link::LinkManager;
//! use serialscope::store::TelemetryStore;
//! use serialscope::transport::MockTransport;
//!
//! // A real shell would use SerialTransport and a port from list_ports()
//! let transport = MockTransport::new();
//! let device = transport.clone();
//!
//! let (mut link, events) = LinkManager::new(Box::new(transport));
//! let store = Arc::new(TelemetryStore::default());
//!
//! // Feed every parsed signal event into the store
//! let feeder = store.clone();
//! link.subscribe(Arc::new(move |key, value, _timestamp| {
//!     feeder.append(key, value);
//! }));
//!
//! link.connect("mock0").unwrap();
//! device.push_incoming(b"TEMP:25.31\r\nOK\r\n".to_vec());
//! # while store.latest("TEMP").is_none() {
//! #     std::thread::sleep(std::time::Duration::from_millis(1));
//! # }
//! link.disconnect().unwrap();
//!
//! assert_eq!(store.latest("TEMP"), Some(25.31));
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod link;
pub mod logger;
pub mod protocol;
pub mod signals;
pub mod store;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Result, ScopeError};
pub use layout::{PlotDescriptor, PlotLayout};
pub use link::{DispatchHub, LinkEvent, LinkManager, Subscriber};
pub use logger::{load_from_file, CsvLogger};
pub use protocol::{LineCodec, LineEvent, LineFramer};
pub use signals::{SignalCatalog, SignalDef};
pub use store::TelemetryStore;
pub use transport::{list_ports, MockTransport, SerialTransport, Transport};
pub use types::{ConnectionState, DataPoint, LinkStats, SignalDirection};
