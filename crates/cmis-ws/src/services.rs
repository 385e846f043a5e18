//! CMIS messaging calls grouped by service.
//!
//! [`WsContext`] is shared by a session and every object it hands out; each
//! method is one SOAP round trip and returns the answer decoded into core
//! types or raw [`ObjectData`].

use log::debug;

use cmis_core::property::properties_from_xml;
use cmis_core::xml::{ns, XmlElement};
use cmis_core::{
    AllowableActions, BaseType, CmisError, CmisResult, ObjectType, PropertyMap, Repository,
    TypeResolver, UnfileObjects,
};

use crate::soap::{ContentUpload, SoapClient, SoapRequest, SoapResponse};
use crate::wsdl::{service, ServiceMap};

/// Properties and actions of one `cmisObjectType` element.
#[derive(Debug, Clone, Default)]
pub struct ObjectData {
    pub properties: PropertyMap,
    pub allowable_actions: Option<AllowableActions>,
}

impl ObjectData {
    pub fn from_xml(object: &XmlElement) -> CmisResult<Self> {
        let properties = match object.child(ns::CMIS, "properties") {
            Some(properties) => properties_from_xml(properties)?,
            None => PropertyMap::new(),
        };
        Ok(Self {
            properties,
            allowable_actions: object
                .child(ns::CMIS, "allowableActions")
                .map(AllowableActions::from_xml),
        })
    }

    pub fn id(&self) -> String {
        self.properties
            .get("cmis:objectId")
            .and_then(|p| p.first_string())
            .unwrap_or_default()
    }

    pub fn base_type(&self) -> BaseType {
        self.properties
            .get("cmis:baseTypeId")
            .and_then(|p| p.first_string())
            .and_then(|id| BaseType::from_id(&id))
            .unwrap_or(BaseType::Document)
    }
}

/// Every object element below `element`: elements carrying a
/// `cmis:properties` child, whatever their own name.
fn collect_objects(element: &XmlElement) -> CmisResult<Vec<ObjectData>> {
    fn walk<'a>(element: &'a XmlElement, found: &mut Vec<&'a XmlElement>) {
        for child in &element.children {
            if child.child(ns::CMIS, "properties").is_some() {
                found.push(child);
            } else {
                walk(child, found);
            }
        }
    }
    let mut found = Vec::new();
    walk(element, &mut found);
    found.into_iter().map(ObjectData::from_xml).collect()
}

fn has_more_items(element: &XmlElement) -> bool {
    fn find<'a>(element: &'a XmlElement) -> Option<&'a XmlElement> {
        element.children.iter().find_map(|c| {
            if c.name == "hasMoreItems" {
                Some(c)
            } else {
                find(c)
            }
        })
    }
    find(element).map(|e| e.text.trim() == "true").unwrap_or(false)
}

fn object_id(response: &SoapResponse) -> CmisResult<String> {
    response
        .text("objectId")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CmisError::runtime(format!("{} answer without an object id", response.body.name)))
}

/// Connection, service endpoints and the repository a session is bound to.
pub struct WsContext {
    pub soap: SoapClient,
    pub services: ServiceMap,
    pub repository: Repository,
}

impl WsContext {
    pub fn repository_id(&self) -> &str {
        &self.repository.id
    }

    fn request(&self, operation: &'static str) -> SoapRequest {
        SoapRequest::new(operation).param("repositoryId", &self.repository.id)
    }

    fn call(&self, service: &str, request: SoapRequest) -> CmisResult<SoapResponse> {
        let url = self.services.require(service)?;
        self.soap.call(url, &request)
    }

    // ── RepositoryService ───────────────────────────────────────────

    /// Ids and names of every repository behind the endpoint.
    pub fn get_repositories(soap: &SoapClient, services: &ServiceMap) -> CmisResult<Vec<Repository>> {
        let url = services.require(service::REPOSITORY)?;
        let response = soap.call(url, &SoapRequest::new("getRepositories"))?;
        Ok(response
            .body
            .children_named(ns::CMISM, "repositories")
            .map(|entry| Repository {
                id: entry.child_text(ns::CMIS, "repositoryId").unwrap_or_default(),
                name: entry.child_text(ns::CMIS, "repositoryName").unwrap_or_default(),
                ..Repository::default()
            })
            .collect())
    }

    pub fn get_repository_info(
        soap: &SoapClient,
        services: &ServiceMap,
        repository_id: &str,
    ) -> CmisResult<Repository> {
        let url = services.require(service::REPOSITORY)?;
        let request = SoapRequest::new("getRepositoryInfo").param("repositoryId", repository_id);
        let response = soap.call(url, &request)?;
        Ok(Repository::from_xml(response.require("repositoryInfo")?))
    }

    pub fn get_type_definition(&self, type_id: &str) -> CmisResult<ObjectType> {
        let request = self.request("getTypeDefinition").param("typeId", type_id);
        let response = self.call(service::REPOSITORY, request)?;
        ObjectType::from_xml(response.require("type")?)
    }

    /// Child types of `type_id`, or the base types when `None`.
    pub fn type_children(&self, type_id: Option<&str>) -> CmisResult<Vec<ObjectType>> {
        let request = self
            .request("getTypeChildren")
            .optional("typeId", type_id)
            .flag("includePropertyDefinitions", true);
        let response = self.call(service::REPOSITORY, request)?;
        let Some(list) = response.child("types") else {
            return Ok(Vec::new());
        };
        list.children_named(ns::CMIS, "types")
            .map(ObjectType::from_xml)
            .collect()
    }

    // ── ObjectService ───────────────────────────────────────────────

    pub fn get_object(&self, id: &str) -> CmisResult<ObjectData> {
        let request = self
            .request("getObject")
            .param("objectId", id)
            .flag("includeAllowableActions", true);
        let response = self.call(service::OBJECT, request)?;
        ObjectData::from_xml(response.require("object")?)
    }

    pub fn get_object_by_path(&self, path: &str) -> CmisResult<ObjectData> {
        let request = self
            .request("getObjectByPath")
            .param("path", path)
            .flag("includeAllowableActions", true);
        let response = self.call(service::OBJECT, request)?;
        ObjectData::from_xml(response.require("object")?)
    }

    pub fn get_allowable_actions(&self, id: &str) -> CmisResult<AllowableActions> {
        let request = self.request("getAllowableActions").param("objectId", id);
        let response = self.call(service::OBJECT, request)?;
        Ok(response
            .child("allowableActions")
            .map(AllowableActions::from_xml)
            .unwrap_or_default())
    }

    /// Returns the id of the updated object, which may be a new version.
    pub fn update_properties(
        &self,
        id: &str,
        change_token: Option<&str>,
        properties: &PropertyMap,
    ) -> CmisResult<String> {
        let request = self
            .request("updateProperties")
            .param("objectId", id)
            .optional("changeToken", change_token)
            .properties(properties);
        let response = self.call(service::OBJECT, request)?;
        Ok(response.text("objectId").filter(|i| !i.is_empty()).unwrap_or_else(|| id.to_string()))
    }

    pub fn delete_object(&self, id: &str, all_versions: bool) -> CmisResult<()> {
        debug!("Deleting object {id}");
        let request = self
            .request("deleteObject")
            .param("objectId", id)
            .flag("allVersions", all_versions);
        self.call(service::OBJECT, request)?;
        Ok(())
    }

    /// Returns the ids the server failed to delete.
    pub fn delete_tree(
        &self,
        folder_id: &str,
        all_versions: bool,
        unfile: UnfileObjects,
        continue_on_failure: bool,
    ) -> CmisResult<Vec<String>> {
        debug!("Deleting tree {folder_id}");
        let request = self
            .request("deleteTree")
            .param("folderId", folder_id)
            .flag("allVersions", all_versions)
            .param("unfileObjects", unfile.as_str())
            .flag("continueOnFailure", continue_on_failure);
        let response = self.call(service::OBJECT, request)?;
        Ok(response
            .child("failedToDelete")
            .map(|failed| {
                failed
                    .children
                    .iter()
                    .filter(|c| c.name == "objectIds" && !c.text.is_empty())
                    .map(|c| c.text.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn get_content_stream(&self, id: &str) -> CmisResult<Vec<u8>> {
        let request = self.request("getContentStream").param("objectId", id);
        self.call(service::OBJECT, request)?.into_stream("contentStream")
    }

    /// Returns the id of the object holding the new content.
    pub fn set_content_stream(
        &self,
        id: &str,
        overwrite: bool,
        change_token: Option<&str>,
        content: &ContentUpload<'_>,
    ) -> CmisResult<String> {
        let request = self
            .request("setContentStream")
            .param("objectId", id)
            .flag("overwriteFlag", overwrite)
            .optional("changeToken", change_token)
            .content_stream(content);
        let response = self.call(service::OBJECT, request)?;
        Ok(response.text("objectId").filter(|i| !i.is_empty()).unwrap_or_else(|| id.to_string()))
    }

    pub fn create_folder(&self, properties: &PropertyMap, parent_id: &str) -> CmisResult<String> {
        let request = self
            .request("createFolder")
            .properties(properties)
            .param("folderId", parent_id);
        object_id(&self.call(service::OBJECT, request)?)
    }

    pub fn create_document(
        &self,
        properties: &PropertyMap,
        parent_id: &str,
        content: &ContentUpload<'_>,
    ) -> CmisResult<String> {
        let request = self
            .request("createDocument")
            .properties(properties)
            .param("folderId", parent_id)
            .content_stream(content);
        object_id(&self.call(service::OBJECT, request)?)
    }

    pub fn move_object(&self, id: &str, target_id: &str, source_id: &str) -> CmisResult<String> {
        let request = self
            .request("moveObject")
            .param("objectId", id)
            .param("targetFolderId", target_id)
            .param("sourceFolderId", source_id);
        let response = self.call(service::OBJECT, request)?;
        Ok(response.text("objectId").filter(|i| !i.is_empty()).unwrap_or_else(|| id.to_string()))
    }

    // ── NavigationService ───────────────────────────────────────────

    /// Every child of a folder, following `hasMoreItems` pages.
    pub fn get_children(&self, folder_id: &str) -> CmisResult<Vec<ObjectData>> {
        let mut children = Vec::new();
        loop {
            let request = self
                .request("getChildren")
                .param("folderId", folder_id)
                .flag("includeAllowableActions", true)
                .param("skipCount", &children.len().to_string());
            let response = self.call(service::NAVIGATION, request)?;
            let page = collect_objects(&response.body)?;
            let more = has_more_items(&response.body);
            let fetched = page.len();
            children.extend(page);
            if !more || fetched == 0 {
                return Ok(children);
            }
        }
    }

    pub fn get_object_parents(&self, id: &str) -> CmisResult<Vec<ObjectData>> {
        let request = self
            .request("getObjectParents")
            .param("objectId", id)
            .flag("includeAllowableActions", true);
        let response = self.call(service::NAVIGATION, request)?;
        collect_objects(&response.body)
    }

    pub fn get_folder_parent(&self, folder_id: &str) -> CmisResult<ObjectData> {
        let request = self.request("getFolderParent").param("folderId", folder_id);
        let response = self.call(service::NAVIGATION, request)?;
        ObjectData::from_xml(response.require("object")?)
    }

    // ── VersioningService ───────────────────────────────────────────

    /// Returns the id of the private working copy.
    pub fn check_out(&self, id: &str) -> CmisResult<String> {
        let request = self.request("checkOut").param("objectId", id);
        object_id(&self.call(service::VERSIONING, request)?)
    }

    pub fn cancel_check_out(&self, pwc_id: &str) -> CmisResult<()> {
        let request = self.request("cancelCheckOut").param("objectId", pwc_id);
        self.call(service::VERSIONING, request)?;
        Ok(())
    }

    /// Returns the id of the new version.
    pub fn check_in(
        &self,
        pwc_id: &str,
        major: bool,
        properties: &PropertyMap,
        content: Option<&ContentUpload<'_>>,
        comment: &str,
    ) -> CmisResult<String> {
        let mut request = self
            .request("checkIn")
            .param("objectId", pwc_id)
            .flag("major", major);
        if !properties.is_empty() {
            request = request.properties(properties);
        }
        if let Some(content) = content {
            request = request.content_stream(content);
        }
        let request = request.optional("checkinComment", Some(comment));
        object_id(&self.call(service::VERSIONING, request)?)
    }

    pub fn get_all_versions(&self, id: &str) -> CmisResult<Vec<ObjectData>> {
        let request = self
            .request("getAllVersions")
            .param("objectId", id)
            .flag("includeAllowableActions", true);
        let response = self.call(service::VERSIONING, request)?;
        collect_objects(&response.body)
    }
}

impl TypeResolver for WsContext {
    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        self.get_type_definition(id)
    }

    fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>> {
        self.type_children(Some(id))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
