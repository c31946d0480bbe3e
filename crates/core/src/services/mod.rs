pub mod favorites_service;
pub mod filter_service;
pub mod narrative_service;
pub mod presenter_service;
pub mod price_simulation_service;
