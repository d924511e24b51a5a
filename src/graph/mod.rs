pub mod builder;
pub mod loader;
pub mod model;
pub mod search;

pub use builder::{GraphBuilder, PlaneTransition, TransitionDirection};
pub use loader::{parse_graph, GraphData, GraphDocument};
pub use model::GraphModel;
pub use search::{AnalysisStatus, GraphSearch, NavigationAnalysis, SearchContext};
