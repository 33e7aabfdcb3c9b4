mod cortex;

pub use cortex::Cortex;
