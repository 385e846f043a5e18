//! Per-object permission map keyed by the closed set of CMIS actions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::xml::{ns, XmlElement};

/// Every action a CMIS server can report on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectAction {
    DeleteObject,
    UpdateProperties,
    GetFolderTree,
    GetProperties,
    GetObjectRelationships,
    GetObjectParents,
    GetFolderParent,
    GetDescendants,
    MoveObject,
    DeleteContentStream,
    CheckOut,
    CancelCheckOut,
    CheckIn,
    SetContentStream,
    GetAllVersions,
    AddObjectToFolder,
    RemoveObjectFromFolder,
    GetContentStream,
    ApplyPolicy,
    GetAppliedPolicies,
    RemovePolicy,
    GetChildren,
    CreateDocument,
    CreateFolder,
    CreateRelationship,
    DeleteTree,
    GetRenditions,
    GetACL,
    ApplyACL,
}

impl ObjectAction {
    pub const ALL: [ObjectAction; 29] = [
        Self::DeleteObject,
        Self::UpdateProperties,
        Self::GetFolderTree,
        Self::GetProperties,
        Self::GetObjectRelationships,
        Self::GetObjectParents,
        Self::GetFolderParent,
        Self::GetDescendants,
        Self::MoveObject,
        Self::DeleteContentStream,
        Self::CheckOut,
        Self::CancelCheckOut,
        Self::CheckIn,
        Self::SetContentStream,
        Self::GetAllVersions,
        Self::AddObjectToFolder,
        Self::RemoveObjectFromFolder,
        Self::GetContentStream,
        Self::ApplyPolicy,
        Self::GetAppliedPolicies,
        Self::RemovePolicy,
        Self::GetChildren,
        Self::CreateDocument,
        Self::CreateFolder,
        Self::CreateRelationship,
        Self::DeleteTree,
        Self::GetRenditions,
        Self::GetACL,
        Self::ApplyACL,
    ];

    /// Element name used on the wire, e.g. `canDeleteObject`.
    pub fn xml_name(&self) -> String {
        format!("can{self:?}")
    }

    pub fn from_xml_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix("can")?;
        Self::ALL.iter().copied().find(|a| format!("{a:?}") == bare)
    }
}

impl fmt::Display for ObjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Server-asserted permission set of one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowableActions {
    states: HashMap<ObjectAction, bool>,
}

impl AllowableActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `cmis:allowableActions` element.
    pub fn from_xml(element: &XmlElement) -> Self {
        let mut actions = Self::new();
        for child in element.children.iter().filter(|c| c.is_in(ns::CMIS)) {
            if let Some(action) = ObjectAction::from_xml_name(&child.name) {
                if let Ok(value) = crate::property::parse_bool(&child.text) {
                    actions.set(action, value);
                }
            }
        }
        actions
    }

    /// Actions for backends that report no permission set, every action
    /// defined. Mutating actions follow `editable`; versioning ones follow
    /// `versionable` as well.
    pub fn for_base_type(is_folder: bool, editable: bool, versionable: bool) -> Self {
        use ObjectAction::*;
        let mut actions = Self::new();
        for action in ObjectAction::ALL {
            let allowed = match action {
                GetProperties | GetObjectParents | GetAllVersions | GetACL => true,
                DeleteObject | UpdateProperties | MoveObject => editable,
                GetChildren | GetFolderParent | GetFolderTree | GetDescendants => is_folder,
                CreateDocument | CreateFolder | DeleteTree => is_folder && editable,
                GetContentStream => !is_folder,
                SetContentStream | DeleteContentStream => !is_folder && editable,
                CheckOut | CancelCheckOut | CheckIn => !is_folder && editable && versionable,
                _ => false,
            };
            actions.set(action, allowed);
        }
        actions
    }

    pub fn set(&mut self, action: ObjectAction, allowed: bool) {
        self.states.insert(action, allowed);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, action: ObjectAction, allowed: bool) -> Self {
        self.set(action, allowed);
        self
    }

    /// Whether the action is allowed. Undefined actions are not allowed.
    pub fn is_allowed(&self, action: ObjectAction) -> bool {
        self.states.get(&action).copied().unwrap_or(false)
    }

    /// Whether the server reported a value for the action at all.
    pub fn is_defined(&self, action: ObjectAction) -> bool {
        self.states.contains_key(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl fmt::Display for AllowableActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allowable Actions:")?;
        for action in ObjectAction::ALL {
            if let Some(allowed) = self.states.get(&action) {
                writeln!(f, "    {action}: {allowed}")?;
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
