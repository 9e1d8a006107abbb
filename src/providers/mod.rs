pub mod pgold;
