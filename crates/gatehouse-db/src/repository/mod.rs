//! SurrealDB implementations of the `gatehouse-core` repository
//! traits.

mod invitation;
mod role;
mod session;
mod user;

pub use invitation::SurrealInvitationRepository;
pub use role::SurrealRoleRepository;
pub use session::SurrealSessionStore;
pub use user::SurrealUserRepository;
