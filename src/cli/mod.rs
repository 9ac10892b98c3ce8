pub mod portfolios;
pub mod ui;
