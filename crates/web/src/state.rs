use importer::ImportService;

#[derive(Clone)]
pub struct AppState {
    pub imports: ImportService,
}
