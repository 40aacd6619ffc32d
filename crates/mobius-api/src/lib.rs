// mobius-api: Async Rust client for the Mobius MDM REST and realtime APIs

pub mod applications;
pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod groups;
pub mod middleware;
pub mod models;
pub mod policies;
pub mod session;
pub mod system;
pub mod transport;
pub mod websocket;

pub use auth::LoginFailure;
pub use client::MobiusClient;
pub use error::Error;
pub use models::{
    Application, ApplicationList, ApplicationPatch, ApplicationUpload, CommandResult, Device,
    DeviceAction, DeviceCommand, DeviceFilter, DeviceGroup, DeviceList, DevicePatch,
    DeviceStatus, GroupDevices, GroupList, GroupPatch, HealthState, HealthStatus, LicenseStatus,
    LicenseTier, LoginRequest, LoginResponse, OsqueryRequest, OsqueryResult, Policy,
    PolicyDevices, PolicyGroups, PolicyList, PolicyPatch, User,
};
pub use session::{AUTH_TOKEN_KEY, MemoryTokenStore, Session, SessionEvent, TokenStore};
pub use transport::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, TlsMode, TransportConfig};
pub use websocket::{MessageHandler, RealtimeHandle};
