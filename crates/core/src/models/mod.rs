pub mod catalog;
pub mod display;
pub mod fund;
pub mod narrative;
pub mod overlay;
pub mod selection;
pub mod settings;
pub mod taxonomy;
