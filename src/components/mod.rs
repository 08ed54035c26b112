pub mod backends;
pub mod bounds;
pub mod filter;
pub mod naming;
pub mod record;
pub mod schema;
pub mod table;
pub mod transforms;
pub mod value;
