pub mod model;
pub mod xyz;
