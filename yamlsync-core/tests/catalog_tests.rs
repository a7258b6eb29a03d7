//! Classification and ranking over the standard processing order.

use rstest::rstest;
use yamlsync_core::{EntityType, ProcessingOrder};

fn order() -> ProcessingOrder {
    ProcessingOrder::standard().expect("standard order")
}

#[rstest]
#[case("Setup/Defaults.yaml", EntityType::AccountDefaults)]
#[case("Setup/Tags.yaml", EntityType::Tag)]
#[case("Setup/Cloud Providers/aws.yaml", EntityType::CloudProvider)]
#[case("Setup/Applications/shop/Index.yaml", EntityType::Application)]
#[case("Setup/Applications/shop/Defaults.yaml", EntityType::ApplicationDefaults)]
#[case("Setup/Applications/shop/Services/cart/Index.yaml", EntityType::Service)]
#[case("Setup/Applications/shop/Services/cart/Artifact Servers/docker.yaml", EntityType::ArtifactStream)]
#[case("Setup/Applications/shop/Services/cart/Config Files/app.properties", EntityType::ConfigFileContent)]
#[case("Setup/Applications/shop/Services/cart/Config Files/app.properties.yaml", EntityType::ConfigFile)]
#[case("Setup/Applications/shop/Services/cart/Manifests/Files/templates/deployment.yaml", EntityType::ManifestFile)]
#[case("Setup/Applications/shop/Services/cart/Values/values.yaml", EntityType::ManifestFileValuesServiceOverride)]
#[case("Setup/Applications/shop/Environments/prod/Index.yaml", EntityType::Environment)]
#[case("Setup/Applications/shop/Environments/prod/Infrastructure Definitions/k8s.yaml", EntityType::InfraDefinition)]
#[case("Setup/Applications/shop/Environments/prod/Config Files/app.properties", EntityType::ConfigFileOverrideContent)]
#[case("Setup/Applications/shop/Workflows/rolling.yaml", EntityType::Workflow)]
#[case("Setup/Applications/shop/Pipelines/release.yaml", EntityType::Pipeline)]
#[case("Setup/Applications/shop/Triggers/nightly.yaml", EntityType::Trigger)]
fn classifies_standard_paths(#[case] path: &str, #[case] expected: EntityType) {
    assert_eq!(order().classify(path).expect("classify"), expected, "path: {path}");
}

#[test]
fn references_rank_before_referrers() {
    let order = order();
    let rank = |t| order.rank_of(t).expect("ranked");
    assert!(rank(EntityType::CloudProvider) < rank(EntityType::ArtifactStream));
    assert!(rank(EntityType::Application) < rank(EntityType::Service));
    assert!(rank(EntityType::Service) < rank(EntityType::Workflow));
    assert!(rank(EntityType::Workflow) < rank(EntityType::Pipeline));
    assert!(rank(EntityType::Pipeline) < rank(EntityType::Trigger));
}

#[test]
fn rank_follows_path_classification() {
    let order = order();
    assert_eq!(
        order.rank("Setup/Applications/shop/Index.yaml"),
        order.rank_of(EntityType::Application)
    );
    assert_eq!(order.rank("Setup/unknown.txt"), None);
}

#[test]
fn custom_order_only_knows_its_types() {
    let order = ProcessingOrder::new(vec![EntityType::Application, EntityType::Workflow])
        .expect("order");
    assert_eq!(order.len(), 2);
    assert!(order.classify("Setup/Applications/shop/Services/cart/Index.yaml").is_err());
    assert_eq!(order.rank_of(EntityType::Workflow), Some(2));
}
