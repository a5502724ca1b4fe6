pub mod elements;
pub mod generator;
pub mod options;
pub mod providers;
