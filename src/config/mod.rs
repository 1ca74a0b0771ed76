pub mod schema;

pub use schema::{
    AuditConfig, Config, GatewayConfig, GeneratorConfig, ObservabilityConfig, PolicyConfig,
    RetrievalConfig, RuntimeConfig,
};
