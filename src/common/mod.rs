mod state;

pub use state::AppContext;
