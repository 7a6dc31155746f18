pub mod paths;
pub mod suggest;
pub mod text;
