//! Built-in prompt ideas offered to users who don't know where to start.

/// Example prompts, in display order.
pub const PROMPT_SUGGESTIONS: &[&str] = &[
    "A red fox curled up in fresh snow at dawn, soft golden light, photorealistic",
    "A cozy reading nook inside a giant hollow tree, warm lantern light, storybook illustration",
    "A futuristic city floating above the clouds at sunset, cinematic wide shot",
    "A watercolor painting of a lighthouse on a rocky cliff during a storm",
    "A steaming bowl of ramen on a wooden table, overhead shot, studio lighting",
    "An astronaut tending a small vegetable garden on the surface of the moon",
    "A vintage travel poster of a mountain railway winding through alpine meadows",
    "A macro photograph of a dew-covered spider web in a misty forest",
];
