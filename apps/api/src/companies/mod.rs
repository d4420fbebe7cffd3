// Companies: CRUD, logo upload and theme derivation.

pub mod handlers;
pub mod logo;
pub mod theme;
