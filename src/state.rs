use crate::config::Config;
use crate::sessions::AttemptRegistry;
use crate::store::{AssessmentStore, MarketplaceStore, MentorStore, UserStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: UserStore,
    pub assessments: AssessmentStore,
    pub attempts: AttemptRegistry,
    pub marketplace: MarketplaceStore,
    pub mentors: MentorStore,
}

impl AppState {
    /// Empty stores. Call `seed::load_demo_catalog` to populate them.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            users: UserStore::default(),
            assessments: AssessmentStore::default(),
            attempts: AttemptRegistry::new(),
            marketplace: MarketplaceStore::default(),
            mentors: MentorStore::default(),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
