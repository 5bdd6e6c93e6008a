//! Native file dialogs

mod dialogs;

pub use dialogs::save_pdf_dialog;
