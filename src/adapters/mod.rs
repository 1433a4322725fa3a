// Adapters layer: concrete implementations of the domain ports for external
// systems (reqwest transport, XML payloads).

pub mod http;
pub mod xml;

pub use http::ReqwestHttpClient;
