
mod cache_test;
mod recipient_test;
mod repository_test;
mod router_test;
mod token_test;
