pub mod token;
pub use token::{TokenError, TokenService};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod army_service;
pub mod army_service_impl;
pub use army_service::{ArmyError, ArmyService};
pub use army_service_impl::SeaOrmArmyService;
