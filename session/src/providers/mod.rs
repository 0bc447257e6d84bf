//! Session collaborators.
//!
//! Traits for everything the engine talks to. The reducers depend on these
//! traits only; applications plug in real implementations and tests plug in
//! the mocks from [`crate::mocks`].
//!
//! ```text
//! IdentityProvider ──┐
//!                    ├── LivePipeline ──┐
//! ProfileResolver ───┘                  ├── SessionEnvironment ── reducers
//!                        BypassPipeline ┘
//! Navigator, RouteMemory ───────────────┘
//! ```

pub mod identity;
pub mod navigator;
pub mod probe;
pub mod profile;
pub mod route_memory;

pub use identity::IdentityProvider;
pub use navigator::Navigator;
pub use probe::{EnvProbe, RuntimeProbe};
pub use profile::{ProfileResolver, ProfileResult};
pub use route_memory::{InMemoryRouteMemory, RouteMemory};
