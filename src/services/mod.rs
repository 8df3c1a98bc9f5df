pub mod mutation_service;

pub use mutation_service::MutationService;
