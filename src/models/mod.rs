mod department;
mod identity;

pub use department::Department;
pub use identity::{Identity, IdentityKind, Module};
