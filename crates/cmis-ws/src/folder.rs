//! WS folders: navigation, creation and tree removal.

use std::io::Read;
use std::sync::Arc;

use cmis_core::object::ObjectCore;
use cmis_core::{
    AllowableActions, CmisObject, CmisResult, DocumentPtr, Fileable, Folder, FolderPtr,
    ObjectPtr, PropertyMap, UnfileObjects,
};

use crate::object::{document_from_data, folder_from_data, object_from_data, WsState};
use crate::services::{ObjectData, WsContext};
use crate::soap::ContentUpload;

pub struct WsFolder {
    state: WsState,
}

impl WsFolder {
    pub fn new(ctx: Arc<WsContext>, data: ObjectData) -> Self {
        Self {
            state: WsState::new(ctx, data),
        }
    }
}

impl CmisObject for WsFolder {
    fn core(&self) -> &ObjectCore {
        self.state.core()
    }

    fn refresh(&self) -> CmisResult<()> {
        self.state.refresh()
    }

    fn update_properties(&self, properties: &PropertyMap) -> CmisResult<()> {
        self.state.update_properties(properties)
    }

    fn remove(&self, all_versions: bool) -> CmisResult<()> {
        self.state.remove(all_versions)
    }

    fn get_allowable_actions(&self) -> CmisResult<AllowableActions> {
        self.state.allowable_actions()
    }

    fn as_folder(&self) -> Option<&dyn Folder> {
        Some(self)
    }

    fn into_folder(self: Arc<Self>) -> Option<FolderPtr> {
        Some(self)
    }
}

impl Fileable for WsFolder {
    fn get_parents(&self) -> CmisResult<Vec<FolderPtr>> {
        Ok(self.get_folder_parent()?.into_iter().collect())
    }

    fn move_object(&self, source: &dyn Folder, destination: &dyn Folder) -> CmisResult<()> {
        self.state.move_object(&source.id(), &destination.id())
    }
}

impl Folder for WsFolder {
    fn is_root_folder(&self) -> bool {
        self.state.id() == self.state.ctx().repository.root_folder_id || self.parent_id().is_none()
    }

    fn get_folder_parent(&self) -> CmisResult<Option<FolderPtr>> {
        if self.is_root_folder() {
            return Ok(None);
        }
        let ctx = self.state.ctx();
        let data = ctx.get_folder_parent(&self.state.id())?;
        folder_from_data(ctx, data).map(Some)
    }

    fn get_children(&self) -> CmisResult<Vec<ObjectPtr>> {
        let ctx = self.state.ctx();
        Ok(ctx
            .get_children(&self.state.id())?
            .into_iter()
            .map(|data| object_from_data(ctx, data))
            .collect())
    }

    fn create_folder(&self, properties: &PropertyMap) -> CmisResult<FolderPtr> {
        let ctx = self.state.ctx();
        let id = ctx.create_folder(properties, &self.state.id())?;
        folder_from_data(ctx, ctx.get_object(&id)?)
    }

    fn create_document(
        &self,
        properties: &PropertyMap,
        stream: &mut dyn Read,
        content_type: &str,
        filename: &str,
    ) -> CmisResult<DocumentPtr> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        let content = ContentUpload {
            data: &data,
            mime_type: content_type,
            filename,
        };
        let ctx = self.state.ctx();
        let id = ctx.create_document(properties, &self.state.id(), &content)?;
        document_from_data(ctx, ctx.get_object(&id)?)
    }

    fn remove_tree(
        &self,
        all_versions: bool,
        unfile: UnfileObjects,
        continue_on_error: bool,
    ) -> CmisResult<Vec<String>> {
        let failed =
            self.state
                .ctx()
                .delete_tree(&self.state.id(), all_versions, unfile, continue_on_error)?;
        self.state.core().touch();
        Ok(failed)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use crate::fixtures::{self, NAVIGATION_URL, OBJECT_URL};
    use cmis_core::{Property, PropertyMap, Session};
    use std::io::Cursor;

    #[test]
    fn root_folder_has_no_parent() {
        let (mock, session) = fixtures::session();
        fixtures::mock_object(&mock, &fixtures::folder_object("100", "", "", "/"));
        let root = session.get_root_folder().unwrap();
        assert!(root.is_root_folder());
        assert!(root.get_folder_parent().unwrap().is_none());
        assert_eq!(root.path(), "/");
    }

    #[test]
    fn children_are_discriminated() {
        let (mock, session) = fixtures::session();
        fixtures::mock_object(&mock, &fixtures::folder_object("100", "", "", "/"));
        mock.expect("POST", NAVIGATION_URL)
            .with_body_containing("<cmism:getChildren>")
            .respond(
                200,
                fixtures::children(
                    &[
                        fixtures::folder_object("101", "My_Folder-0-0", "100", "/My_Folder-0-0"),
                        fixtures::document_object("114", "My_Document-0-0"),
                    ],
                    false,
                ),
            );
        let children = session.get_root_folder().unwrap().get_children().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0].as_folder().is_some());
        assert!(children[1].as_document().is_some());
    }

    #[test]
    fn folder_parent_is_fetched() {
        let (mock, session) = fixtures::session();
        fixtures::mock_object(
            &mock,
            &fixtures::folder_object("102", "My_Folder-1-0", "101", "/My_Folder-0-0/My_Folder-1-0"),
        );
        mock.expect("POST", NAVIGATION_URL)
            .with_body_containing("<cmism:getFolderParent>")
            .respond(
                200,
                fixtures::envelope(&format!(
                    "<cmism:getFolderParentResponse>{}</cmism:getFolderParentResponse>",
                    fixtures::folder_object("101", "My_Folder-0-0", "100", "/My_Folder-0-0")
                )),
            );
        let folder = session.get_folder("102").unwrap();
        let parent = folder.get_folder_parent().unwrap().unwrap();
        assert_eq!(parent.id(), "101");
        assert_eq!(folder.get_parents().unwrap().len(), 1);
    }

    #[test]
    fn create_document_sends_base64_content() {
        let (mock, session) = fixtures::session();
        fixtures::mock_object(&mock, &fixtures::folder_object("100", "", "", "/"));
        mock.expect("POST", OBJECT_URL)
            .with_body_containing("<cmism:createDocument>")
            .respond(
                200,
                fixtures::envelope(
                    "<cmism:createDocumentResponse><cmism:objectId>200</cmism:objectId>\
                     </cmism:createDocumentResponse>",
                ),
            );
        fixtures::mock_object(&mock, &fixtures::document_object("200", "data.txt"));

        let mut props = PropertyMap::new();
        props.insert("cmis:name".into(), Property::string("cmis:name", "data.txt"));
        props.insert(
            "cmis:objectTypeId".into(),
            Property::id("cmis:objectTypeId", "cmis:document"),
        );
        let root = session.get_root_folder().unwrap();
        let document = root
            .create_document(&props, &mut Cursor::new(b"hello".to_vec()), "text/plain", "data.txt")
            .unwrap();
        assert_eq!(document.id(), "200");

        let sent = mock.requests_to("POST", OBJECT_URL);
        let body = sent
            .iter()
            .map(|r| r.body_text())
            .find(|b| b.contains("createDocument"))
            .unwrap();
        assert!(body.contains("<cmism:folderId>100</cmism:folderId>"));
        assert!(body.contains("<cmism:stream>aGVsbG8=</cmism:stream>"));
        assert!(body.contains("<cmism:mimeType>text/plain</cmism:mimeType>"));
    }

    #[test]
    fn create_folder_returns_the_new_folder() {
        let (mock, session) = fixtures::session();
        fixtures::mock_object(&mock, &fixtures::folder_object("100", "", "", "/"));
        mock.expect("POST", OBJECT_URL)
            .with_body_containing("<cmism:createFolder>")
            .respond(
                200,
                fixtures::envelope(
                    "<cmism:createFolderResponse><cmism:objectId>201</cmism:objectId>\
                     </cmism:createFolderResponse>",
                ),
            );
        fixtures::mock_object(&mock, &fixtures::folder_object("201", "New", "100", "/New"));

        let mut props = PropertyMap::new();
        props.insert("cmis:name".into(), Property::string("cmis:name", "New"));
        let folder = session.get_root_folder().unwrap().create_folder(&props).unwrap();
        assert_eq!(folder.path(), "/New");
        assert!(!folder.is_root_folder());
    }

    #[test]
    fn remove_tree_touches_the_folder() {
        let (mock, session) = fixtures::session();
        fixtures::mock_object(&mock, &fixtures::folder_object("101", "My_Folder-0-0", "100", "/My_Folder-0-0"));
        mock.expect("POST", OBJECT_URL)
            .with_body_containing("<cmism:deleteTree>")
            .respond(200, fixtures::envelope("<cmism:deleteTreeResponse/>"));
        let folder = session.get_folder("101").unwrap();
        assert_eq!(folder.refresh_timestamp(), 0);
        let failed = folder
            .remove_tree(true, cmis_core::UnfileObjects::Delete, false)
            .unwrap();
        assert!(failed.is_empty());
        assert!(folder.refresh_timestamp() > 0);
    }
}
