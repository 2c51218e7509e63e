pub mod ask_question_tool;
pub mod chat_history_tool;
pub mod upload_pdf_tool;
