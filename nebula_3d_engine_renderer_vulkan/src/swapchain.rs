/// Swapchain management: creation, acquire/present, recreation on resize
///
/// Presentation is separated from rendering logic: frame synchronization
/// primitives live in the frame contexts, and this module only owns the
/// swapchain images and the out-of-date/suboptimal discrimination that
/// drives the recreate path.

use ash::vk;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_err, engine_error, Error, Result};

/// Acquire/present timeout: long but not infinite, so a wedged driver
/// surfaces as an error instead of a hang
pub const ACQUIRE_TIMEOUT_NS: u64 = 1_000_000_000;

/// Vulkan swapchain plus its images and views
pub struct Swapchain {
    device: ash::Device,
    physical_device: vk::PhysicalDevice,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create the swapchain against an existing surface
    pub fn new(
        ctx: &EngineContext,
        instance: &ash::Instance,
        device: ash::Device,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        window_extent: (u32, u32),
    ) -> Result<Self> {
        unsafe {
            let surface_capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(|e| {
                    engine_error!(ctx, "nebula3d::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            let surface_formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| {
                    engine_error!(ctx, "nebula3d::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;

            let surface_format = surface_formats
                .iter()
                .find(|f| {
                    f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB
                })
                .unwrap_or(&surface_formats[0]);

            let extent = choose_extent(&surface_capabilities, window_extent);
            let image_count = choose_image_count(&surface_capabilities);

            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(surface_capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true);

            let swapchain_loader = ash::khr::swapchain::Device::new(instance, &device);
            let swapchain = swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    engine_error!(ctx, "nebula3d::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            let images = swapchain_loader.get_swapchain_images(swapchain).map_err(|e| {
                engine_error!(ctx, "nebula3d::vulkan", "Failed to get swapchain images: {:?}", e);
                Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
            })?;

            let image_views =
                create_image_views(ctx, &device, &images, surface_format.format)?;

            Ok(Self {
                device,
                physical_device,
                surface,
                surface_loader,
                swapchain,
                swapchain_loader,
                images,
                image_views,
                format: surface_format.format,
                color_space: surface_format.color_space,
                extent,
            })
        }
    }

    /// Acquire the next presentable image.
    ///
    /// Returns the image index plus a `suboptimal` flag: a suboptimal
    /// acquire still delivers a usable image (the frame proceeds and the
    /// swapchain is recreated after present). An out-of-date swapchain
    /// acquires nothing and surfaces as [`Error::SwapchainOutOfDate`] so
    /// the frame is dropped.
    pub fn acquire_next_image(
        &mut self,
        ctx: &EngineContext,
        signal_semaphore: vk::Semaphore,
    ) -> Result<(u32, bool)> {
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                ACQUIRE_TIMEOUT_NS,
                signal_semaphore,
                vk::Fence::null(),
            ) {
                Ok((image_index, suboptimal)) => Ok((image_index, suboptimal)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SwapchainOutOfDate),
                Err(e) => Err(engine_err!(
                    ctx,
                    "nebula3d::vulkan",
                    "Failed to acquire next swapchain image: {:?}",
                    e
                )),
            }
        }
    }

    /// Present `image_index`, waiting on `wait_semaphore`.
    ///
    /// Returns `true` when the swapchain must be recreated (out-of-date or
    /// suboptimal); any other failure is fatal.
    pub fn present(
        &mut self,
        ctx: &EngineContext,
        present_queue: vk::Queue,
        wait_semaphore: vk::Semaphore,
        image_index: u32,
    ) -> Result<bool> {
        unsafe {
            let swapchains = [self.swapchain];
            let image_indices = [image_index];
            let wait_semaphores = [wait_semaphore];

            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&wait_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            match self
                .swapchain_loader
                .queue_present(present_queue, &present_info)
            {
                Ok(false) => Ok(false),
                Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(true),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
                Err(e) => Err(engine_err!(
                    ctx,
                    "nebula3d::vulkan",
                    "Failed to present swapchain image: {:?}",
                    e
                )),
            }
        }
    }

    /// Rebuild the swapchain at the current surface size.
    ///
    /// The caller must have waited for all in-flight frames and flushed the
    /// swapchain-scoped destruction queue before calling.
    pub fn recreate(&mut self, ctx: &EngineContext, window_extent: (u32, u32)) -> Result<()> {
        unsafe {
            // Destroy old image views
            for view in self.image_views.drain(..) {
                self.device.destroy_image_view(view, None);
            }

            let surface_capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| {
                    engine_err!(
                        ctx,
                        "nebula3d::vulkan",
                        "Failed to get surface capabilities during swapchain recreate: {:?}",
                        e
                    )
                })?;

            let extent = choose_extent(&surface_capabilities, window_extent);
            let image_count = choose_image_count(&surface_capabilities);

            let old_swapchain = self.swapchain;
            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(self.format)
                .image_color_space(self.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(surface_capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self
                .swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    engine_err!(ctx, "nebula3d::vulkan", "Failed to recreate swapchain: {:?}", e)
                })?;

            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            self.swapchain = swapchain;
            self.extent = extent;

            self.images = self
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    engine_err!(
                        ctx,
                        "nebula3d::vulkan",
                        "Failed to get swapchain images during recreate: {:?}",
                        e
                    )
                })?;

            self.image_views = create_image_views(ctx, &self.device, &self.images, self.format)?;

            Ok(())
        }
    }

    /// Destroy the swapchain, its views, and the surface.
    ///
    /// Called during renderer finalize after device idle.
    pub fn destroy(&mut self) {
        unsafe {
            for view in self.image_views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }

    /// Number of presentable images
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Swapchain image views (one framebuffer per view for
    /// swapchain-sized passes)
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Color format of the presentable images
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Current swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

/// Pick the swapchain extent from capabilities, clamping the window size
/// when the surface leaves it to us
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: (u32, u32),
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: window_extent.0.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: window_extent.1.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// min + 1 images, clamped to the surface maximum (0 = unlimited)
fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

fn create_image_views(
    ctx: &EngineContext,
    device: &ash::Device,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>> {
    let mut views = Vec::with_capacity(images.len());
    for &image in images {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = unsafe {
            device.create_image_view(&create_info, None).map_err(|e| {
                engine_err!(
                    ctx,
                    "nebula3d::vulkan",
                    "Failed to create swapchain image view: {:?}",
                    e
                )
            })?
        };
        views.push(view);
    }
    Ok(views)
}
