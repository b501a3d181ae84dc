pub mod exp_tail;
pub mod search_space;

pub use exp_tail::ExpTailParams;
pub use search_space::SearchSpace;
