use std::sync::Arc;

use sondeo_application::{
    AssignmentService, AuthorizationService, RoleService, SurveyService, UserDirectory,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub role_service: RoleService,
    pub assignment_service: AssignmentService,
    pub survey_service: SurveyService,
    pub user_directory: Arc<dyn UserDirectory>,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
