//! Distance Module: Comparing Persistence Diagrams
//!
//! For diagrams D₁, D₂ and a partial matching η between them, points
//! left out of η are matched to their projection on the diagonal:
//!
//!   W_p(D₁, D₂) = ( Σ ‖x - η(x)‖^p )^(1/p)
//!   W_∞(D₁, D₂) = max ‖x - η(x)‖
//!
//! The exact distances minimize over all matchings (a weighted bipartite
//! assignment problem). The engines here pick η greedily, which is fast
//! enough for every detection cycle. A caller needing exact metric
//! guarantees can plug an optimal matcher in behind [`DiagramDistance`].

mod matching;

pub use matching::{
    bottleneck, wasserstein, DiagramDistance, GreedyBottleneck, GreedyWasserstein,
    DIAGONAL_NOISE,
};
