//! Behavioral tests, grouped by component.

mod controller;
mod hmc;
mod mapping;
mod power;
mod refresh;
mod salp;
mod timing;
mod tldram;
