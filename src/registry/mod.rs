//! Service registry aggregation
//!
//! Fetches Eureka-style registry documents per deployment stage and normalizes
//! them into per-application records.
//!
//! ```text
//! RegistryService
//!   ├── StageRegistry      (stage -> registry URL)
//!   ├── StageCache         (single-flight memoization per stage)
//!   └── RegistryFetcher    (HTTP GET, Accept: application/json)
//!         └── normalize()  (hosts, ports, consumers, metadata whitelist)
//! ```

pub mod cache;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod normalizer;
pub mod service;
pub mod stages;

pub use cache::StageCache;
pub use document::{InstanceRecord, PortRecord, RawApplication, RawRegistryDocument};
pub use error::RegistryError;
pub use fetcher::{HttpRegistryFetcher, RegistryFetcher};
pub use model::{ConsumerDescriptor, HostDescriptor, NormalizedApplication, StageResultSet};
pub use normalizer::{normalize, parse_consumers, METADATA_WHITELIST};
pub use service::RegistryService;
pub use stages::StageRegistry;
