pub mod retrieve_route;
