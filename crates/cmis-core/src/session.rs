//! The session contract every binding implements.

use crate::error::{CmisError, CmisResult};
use crate::object::{FolderPtr, ObjectPtr};
use crate::object_type::ObjectType;
use crate::repository::Repository;

/// An authenticated connection to one repository.
///
/// Sessions are shared between threads; every call is a blocking round trip
/// and nothing returned is cached across calls except the repository list
/// fetched at construction.
pub trait Session: Send + Sync {
    /// The repository this session is bound to.
    fn get_repository(&self) -> Repository;

    /// Every repository the endpoint advertises.
    fn get_repositories(&self) -> Vec<Repository>;

    fn get_object(&self, id: &str) -> CmisResult<ObjectPtr>;

    fn get_object_by_path(&self, path: &str) -> CmisResult<ObjectPtr>;

    /// Fetch a type definition, with its resolver bound.
    fn get_type(&self, id: &str) -> CmisResult<ObjectType>;

    /// The base types the repository declares.
    fn get_base_types(&self) -> CmisResult<Vec<ObjectType>>;

    fn get_root_folder(&self) -> CmisResult<FolderPtr> {
        let root_id = self.get_repository().root_folder_id;
        self.get_folder(&root_id)
    }

    /// Fetch an object that must be a folder.
    fn get_folder(&self, id: &str) -> CmisResult<FolderPtr> {
        self.get_object(id)?
            .into_folder()
            .ok_or_else(|| CmisError::invalid(format!("Object {id} is not a folder")))
    }
}
