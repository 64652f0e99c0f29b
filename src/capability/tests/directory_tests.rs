//! Tests for descriptors and the first-registration-wins directory.

use crate::capability::domain::{
    CapabilityDescriptor, CapabilityDirectory, CapabilityDomainError, CapabilityKind,
    DirectoryInsertion, PageInstanceId, PromptArgument, PromptDescriptor, ResourceDescriptor,
    ToolDescriptor,
};
use rstest::rstest;
use serde_json::{Map, json};

fn tool(name: &str, description: &str) -> CapabilityDescriptor {
    ToolDescriptor::new(name, description)
        .expect("valid tool descriptor")
        .into()
}

#[rstest]
fn duplicate_tool_keeps_first_descriptor() {
    let mut directory = CapabilityDirectory::new();

    assert_eq!(
        directory.insert(tool("get_user_profile", "first")),
        DirectoryInsertion::Added
    );
    assert_eq!(
        directory.insert(tool("get_user_profile", "second")),
        DirectoryInsertion::Duplicate
    );

    assert_eq!(directory.tools().len(), 1);
    let stored = directory.tools().first().expect("tool should exist");
    assert_eq!(stored.description(), "first");
}

#[rstest]
fn same_name_across_kinds_is_allowed() {
    let mut directory = CapabilityDirectory::new();
    directory.insert(tool("overview", "tool"));
    let resource = ResourceDescriptor::new("overview", "resource").expect("valid resource");

    assert!(directory.insert(resource.into()).is_added());
    assert_eq!(directory.len_of(CapabilityKind::Tool), 1);
    assert_eq!(directory.len_of(CapabilityKind::Resource), 1);
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_names_are_rejected(#[case] name: &str) {
    assert_eq!(
        ToolDescriptor::new(name, "desc"),
        Err(CapabilityDomainError::EmptyCapabilityName(CapabilityKind::Tool))
    );
    assert_eq!(
        PromptDescriptor::new(name, "desc"),
        Err(CapabilityDomainError::EmptyCapabilityName(
            CapabilityKind::Prompt
        ))
    );
}

#[rstest]
fn descriptor_defaults_apply_when_fields_are_missing() {
    let tool: ToolDescriptor =
        serde_json::from_value(json!({"name": "list_notifications"})).expect("valid tool json");
    assert_eq!(tool.description(), "");
    assert_eq!(tool.input_schema(), &json!({}));

    let resource: ResourceDescriptor =
        serde_json::from_value(json!({"name": "user_context"})).expect("valid resource json");
    assert_eq!(resource.mime_type(), "text/plain");
}

#[rstest]
fn tool_descriptor_uses_camel_case_schema_field() {
    let tool = ToolDescriptor::new("search_documents", "Search")
        .expect("valid tool")
        .with_input_schema(json!({"type": "object"}));

    let value = serde_json::to_value(&tool).expect("serialisable tool");

    assert_eq!(value.get("inputSchema"), Some(&json!({"type": "object"})));
}

#[rstest]
fn prompt_reports_missing_required_arguments() {
    let prompt = PromptDescriptor::new("analyze_user", "Analyse a user")
        .expect("valid prompt")
        .with_arguments([
            PromptArgument::new("userId", "User identifier", true).expect("valid argument"),
            PromptArgument::new("period", "Period", false).expect("valid argument"),
        ]);

    assert_eq!(prompt.missing_required(&Map::new()), vec!["userId"]);
}

#[rstest]
fn numeric_and_string_page_ids_match() {
    assert_eq!(
        PageInstanceId::from(42),
        PageInstanceId::new(" 42 ").expect("valid page id")
    );
}

#[rstest]
fn deserialized_blank_descriptor_fails_validation() {
    let descriptor: CapabilityDescriptor =
        serde_json::from_value(json!({"kind": "resource", "name": " "})).expect("valid json");

    assert!(descriptor.validate().is_err());
}
