// Job–student matching: weighted scorer and talent-pool ranking.

pub mod pool;
pub mod scorer;
