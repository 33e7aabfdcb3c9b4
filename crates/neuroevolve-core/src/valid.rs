/// Implemented by anything that can be checked against its own structural invariants.
pub trait Valid {
    fn is_valid(&self) -> bool;
}
