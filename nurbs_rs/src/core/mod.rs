pub mod branch;
pub mod error;
pub mod function;
pub mod knots;
pub mod polynomial;
pub mod quadrature;
pub mod rational;
pub mod registry;
pub mod roots;
pub mod space;
pub mod splines;
