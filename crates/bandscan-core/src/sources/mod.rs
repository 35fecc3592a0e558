pub mod somafm;
pub mod tunein;
