pub mod post_remote_key_repository;
pub mod post_repository;

pub use post_remote_key_repository::{PostRemoteKeyRepository, RemoteKeyEntity, RemoteKeyKind};
pub use post_repository::PostRepository;
