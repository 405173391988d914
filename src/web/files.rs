use anyhow::anyhow;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Blob, BlobPropertyBag, Document, FileReader, HtmlAnchorElement, HtmlInputElement,
    ProgressEvent, Url,
};

/// Offers `json` to the user as a downloaded file.
pub fn download_json(document: &Document, json: &str, file_name: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(json));

    let options = BlobPropertyBag::new();
    options.set_type("application/json");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    Url::revoke_object_url(&url)?;
    log::info!("Exported {} ({} bytes)", file_name, json.len());
    Ok(())
}

/// Reads the first file selected in `input` as text and hands it to `on_done`.
/// Does nothing when no file is selected.
pub fn read_selected_file<F>(input: &HtmlInputElement, on_done: F) -> Result<(), JsValue>
where
    F: FnOnce(anyhow::Result<String>) + 'static,
{
    let Some(file) = input.files().and_then(|files| files.get(0)) else {
        log::debug!("No file selected");
        return Ok(());
    };

    let reader = FileReader::new()?;
    let source = reader.clone();
    let name = file.name();

    // loadend fires once for success and failure alike.
    let on_loadend = Closure::once_into_js(move |_event: ProgressEvent| {
        let text = source
            .result()
            .ok()
            .and_then(|value| value.as_string())
            .ok_or_else(|| anyhow!("Could not read {name} as text"));
        on_done(text);
    });
    reader.set_onloadend(Some(on_loadend.unchecked_ref()));
    reader.read_as_text(&file)?;
    Ok(())
}
