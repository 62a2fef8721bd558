/// Vulkan debug messenger - handles validation layer messages with colored output
///
/// The callback is a C function and cannot capture an engine context, so it
/// prints directly to the console in the same format the default logger uses.

use ash::vk;
use colored::*;
use std::ffi::CStr;

/// Debug messenger callback for VK_EXT_debug_utils.
///
/// Errors and warnings from the validation layers are printed with severity
/// coloring; info/verbose messages are dimmed.
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }

    let callback_data = *p_callback_data;
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let type_str = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "performance"
    } else {
        "general"
    };

    let severity_colored =
        if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            "VULKAN ERROR".red().bold()
        } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            "VULKAN WARN ".yellow()
        } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            "VULKAN INFO ".cyan()
        } else {
            "VULKAN VERB ".bright_black()
        };

    println!("[{}] [{}] {}", severity_colored, type_str, message);

    // Never abort the call that triggered the message
    vk::FALSE
}
