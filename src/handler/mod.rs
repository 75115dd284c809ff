pub mod dispatcher;
pub mod outcome;
pub mod request;
pub mod routes;

pub use dispatcher::RequestHandler;
pub use outcome::RequestOutcome;
pub use request::DataServiceRequest;
pub use routes::entity_routes;
