pub mod google_cloud_client;
pub mod google_free_client;

pub use google_cloud_client::GoogleCloudClient;
pub use google_free_client::GoogleFreeClient;
