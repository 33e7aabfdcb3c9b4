mod comparator;
mod fitness;

pub use comparator::FitnessComparator;
pub use fitness::Fitness;
