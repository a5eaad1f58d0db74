//! Mock [`ContainerEngine`] shared by unit tests.

use bollard::auth::DockerCredentials;
use bollard::models::{ContainerCreateBody, ContainerCreateResponse, ContainerInspectResponse};
use bollard::query_parameters::CreateContainerOptions;
use mockall::mock;

use super::{ContainerEngine, EngineFuture, PullProgressStream};

mock! {
    pub Engine {}

    impl ContainerEngine for Engine {
        fn ping<'a>(&'a self) -> EngineFuture<'a, ()>;
        fn pull_image<'a>(
            &'a self,
            image: &str,
            credentials: Option<DockerCredentials>,
        ) -> PullProgressStream<'a>;
        fn inspect_container<'a>(
            &'a self,
            name: &str,
        ) -> EngineFuture<'a, Option<ContainerInspectResponse>>;
        fn stop_container<'a>(&'a self, name: &str) -> EngineFuture<'a, ()>;
        fn remove_container<'a>(&'a self, name: &str) -> EngineFuture<'a, ()>;
        fn create_container<'a>(
            &'a self,
            options: CreateContainerOptions,
            body: ContainerCreateBody,
        ) -> EngineFuture<'a, ContainerCreateResponse>;
        fn start_container<'a>(&'a self, container_id: &str) -> EngineFuture<'a, ()>;
    }
}
