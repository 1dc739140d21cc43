pub mod access;
pub mod codec;
pub mod invitations;
pub mod security;

pub use access::*;
pub use codec::*;
pub use invitations::*;
pub use security::*;
