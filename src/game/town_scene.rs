//! The town: a Tiled map with three tile layers, a walking player and a
//! camera that follows them.

use bevy::prelude::*;

use super::animation::{AnimationLibrary, SpriteAnimator};
use super::atlas::SpriteAtlas;
use super::camera::FollowCamera;
use super::components::*;
use super::controller::{resolve_motion, DirectionalInput};
use super::error::AssetError;
use super::tilemap::{CollisionGrid, TileLayer, TiledMap, TiledTileset};
use crate::assets_map::AssetsMap;
use crate::config::tuning::Tuning;
use crate::plugins::scene_plugin::{PendingAssets, SceneLifecycle};
use crate::plugins::ui_plugin::spawn_help_text;

#[derive(Resource, Default)]
pub struct TownScene {
    loaded: Option<LoadedAssets>,
}

struct LoadedAssets {
    map: Handle<TiledMap>,
    atlas: Handle<SpriteAtlas>,
    tileset_image: Handle<Image>,
    atlas_image: Handle<Image>,
}

impl SceneLifecycle for TownScene {
    fn load(&mut self, world: &mut World) -> Result<(), AssetError> {
        let manifest = world.resource::<Tuning>().assets.clone();
        let server = world.resource::<AssetServer>().clone();
        let mut pending = world.resource_mut::<PendingAssets>();

        self.loaded = Some(LoadedAssets {
            map: pending.request(&server, &manifest.map),
            atlas: pending.request(&server, &manifest.atlas_json),
            tileset_image: pending.request(&server, &manifest.tileset_image),
            atlas_image: pending.request(&server, &manifest.atlas_image),
        });
        info!(
            "Requested map {} and atlas {} from {}",
            manifest.map, manifest.atlas_json, manifest.root
        );
        Ok(())
    }

    fn initialize(&mut self, world: &mut World) -> Result<(), AssetError> {
        let loaded = self.loaded.as_ref().ok_or(AssetError::NotLoaded)?;
        let map = world
            .resource::<Assets<TiledMap>>()
            .get(&loaded.map)
            .cloned()
            .ok_or(AssetError::NotLoaded)?;
        let atlas = world
            .resource::<Assets<SpriteAtlas>>()
            .get(&loaded.atlas)
            .cloned()
            .ok_or(AssetError::NotLoaded)?;
        let tuning = world.resource::<Tuning>().clone();
        let names = world.resource::<AssetsMap>().clone();
        let manifest = &tuning.assets;

        // Resolve everything fallible before spawning anything.
        let tileset = map.tileset(&manifest.tileset_name)?;
        let below = map.tile_layer(&manifest.below_layer)?;
        let world_layer = map.tile_layer(&manifest.world_layer)?;
        let above = map.tile_layer(&manifest.above_layer)?;
        let spawn = map
            .object(&manifest.object_layer, &manifest.spawn_object)?
            .position();
        let spawn_frame = atlas
            .index(&names.spawn_frame)
            .ok_or_else(|| AssetError::MissingFrame(names.spawn_frame.clone()))?;
        let frame_size = atlas
            .frame_size(&names.spawn_frame)
            .ok_or_else(|| AssetError::MissingFrame(names.spawn_frame.clone()))?;

        let (tile_layout, player_layout) = {
            let mut layouts = world.resource_mut::<Assets<TextureAtlasLayout>>();
            (
                layouts.add(tileset.atlas_layout()),
                layouts.add(atlas.layout.clone()),
            )
        };

        let tiles = TileSprites {
            map: &map,
            tileset,
            image: &loaded.tileset_image,
            layout: &tile_layout,
        };
        tiles.spawn_layer(world, below, BELOW_LAYER_Z);
        tiles.spawn_layer(world, world_layer, WORLD_LAYER_Z);
        tiles.spawn_layer(world, above, tuning.above_layer_depth);

        world.insert_resource(CollisionGrid::from_layer(
            &map,
            world_layer,
            &manifest.collision_property,
        ));
        world.insert_resource(AnimationLibrary::build(
            &atlas,
            &names,
            tuning.walk_frame_rate,
        ));

        let display_size = Vec2::splat(tuning.player_display_size);
        let body = Body::from_frame(
            frame_size,
            display_size,
            Vec2::from(tuning.hitbox_size),
            Vec2::from(tuning.hitbox_offset),
        );
        let mut sprite = Sprite::from_atlas_image(
            loaded.atlas_image.clone(),
            TextureAtlas {
                layout: player_layout,
                index: spawn_frame,
            },
        );
        sprite.custom_size = Some(display_size);

        world.spawn((
            Player,
            DirectionalInput::default(),
            Velocity::default(),
            MapPosition(spawn),
            body,
            SpriteAnimator::new(spawn_frame),
            sprite,
            Transform::from_translation(map_to_world(spawn).extend(PLAYER_Z)),
        ));

        world.spawn((
            Camera2d,
            FollowCamera {
                bounds: Rect::from_corners(Vec2::ZERO, map.pixel_size()),
            },
            Transform::from_translation(map_to_world(spawn).extend(0.0)),
        ));

        spawn_help_text(world, &tuning.help_text);

        info!("Player spawned at {spawn}");
        Ok(())
    }

    fn tick(&mut self, world: &mut World) {
        let speed = world.resource::<Tuning>().player_speed;
        world.try_resource_scope(|world, library: Mut<AnimationLibrary>| {
            let mut players = world.query_filtered::<
                (&DirectionalInput, &mut Velocity, &mut SpriteAnimator),
                With<Player>,
            >();
            for (input, mut velocity, mut animator) in players.iter_mut(world) {
                let motion = resolve_motion(speed, *input, velocity.0);
                velocity.0 = motion.velocity;
                animator.apply(motion.pose, &library);
            }
        });
    }
}

/// Spawns one atlas sprite per cell of a tile layer.
struct TileSprites<'a> {
    map: &'a TiledMap,
    tileset: &'a TiledTileset,
    image: &'a Handle<Image>,
    layout: &'a Handle<TextureAtlasLayout>,
}

impl TileSprites<'_> {
    fn spawn_layer(&self, world: &mut World, layer: &TileLayer, z: f32) {
        if !layer.visible {
            return;
        }
        let tile_size = self.map.tile_size();
        let tint = Color::srgba(1.0, 1.0, 1.0, layer.opacity);

        let mut count = 0;
        for (x, y, gid) in layer.cells() {
            // Tiles from other tilesets are not drawn by this layer.
            let Some((tileset, local)) = self.map.tileset_for_gid(gid) else {
                continue;
            };
            if tileset.first_gid != self.tileset.first_gid {
                continue;
            }

            let center = (Vec2::new(x as f32, y as f32) + 0.5) * tile_size;
            let mut sprite = Sprite::from_atlas_image(
                self.image.clone(),
                TextureAtlas {
                    layout: self.layout.clone(),
                    index: local as usize,
                },
            );
            sprite.color = tint;
            world.spawn((sprite, Transform::from_translation(map_to_world(center).extend(z))));
            count += 1;
        }
        debug!("Layer {:?}: {count} tiles at depth {z}", layer.name);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::game::animation::AnimationClip;
    use crate::game::controller::{AnimationKey, PoseSelection};
    use crate::game::physics::integrate_bodies;
    use crate::game::tilemap::tests::town_grid;
    use crate::plugins::ui_plugin::HelpText;

    fn walking_world() -> World {
        let mut world = World::new();
        world.insert_resource(Tuning::default());
        let mut library = AnimationLibrary::default();
        library.insert_clip(
            AnimationKey::WalkRight,
            AnimationClip {
                frames: vec![7, 8],
                frame_rate: 10.0,
            },
        );
        world.insert_resource(library);
        world
    }

    #[test]
    fn initialize_without_load_is_an_error() {
        let mut world = World::new();
        world.insert_resource(Tuning::default());
        world.insert_resource(AssetsMap::with_defaults());
        let mut scene = TownScene::default();
        assert!(matches!(scene.initialize(&mut world), Err(AssetError::NotLoaded)));
    }

    #[test]
    fn failed_initialize_leaves_the_world_empty() {
        let mut world = World::new();
        world.insert_resource(Tuning::default());
        world.insert_resource(AssetsMap::with_defaults());
        world.init_resource::<Assets<TiledMap>>();
        world.init_resource::<Assets<SpriteAtlas>>();
        let mut scene = TownScene {
            loaded: Some(LoadedAssets {
                map: Handle::default(),
                atlas: Handle::default(),
                tileset_image: Handle::default(),
                atlas_image: Handle::default(),
            }),
        };

        assert!(matches!(scene.initialize(&mut world), Err(AssetError::NotLoaded)));
        let mut help = world.query::<&HelpText>();
        assert_eq!(help.iter(&world).count(), 0);
        let mut players = world.query::<&Player>();
        assert_eq!(players.iter(&world).count(), 0);
    }

    #[test]
    fn tick_drives_velocity_and_pose() {
        let mut world = walking_world();
        let player = world
            .spawn((
                Player,
                DirectionalInput {
                    right: true,
                    down: true,
                    ..default()
                },
                Velocity::default(),
                SpriteAnimator::new(0),
            ))
            .id();

        let mut scene = TownScene::default();
        scene.tick(&mut world);

        let velocity = world.get::<Velocity>(player).unwrap().0;
        assert!((velocity.length() - 170.0).abs() < 1e-3);
        assert!(velocity.x > 0.0 && velocity.y > 0.0);
        assert_eq!(world.get::<SpriteAnimator>(player).unwrap().frame(), 7);
    }

    #[test]
    fn releasing_keys_against_a_wall_keeps_the_frame() {
        let mut world = walking_world();
        world.insert_resource(town_grid());
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs_f32(1.0 / 60.0));
        world.insert_resource(time);

        // 10x10 body just left of the solid tiles at x 32..96, y 32..64.
        let player = world
            .spawn((
                Player,
                DirectionalInput {
                    right: true,
                    ..default()
                },
                Velocity::default(),
                MapPosition(Vec2::new(26.0, 48.0)),
                Body {
                    size: Vec2::splat(10.0),
                    offset: Vec2::splat(-5.0),
                },
                SpriteAnimator::new(0),
            ))
            .id();

        let mut scene = TownScene::default();
        scene.tick(&mut world);
        assert_eq!(world.get::<SpriteAnimator>(player).unwrap().frame(), 7);

        world.run_system_once(integrate_bodies).unwrap();
        let carried = world.get::<Velocity>(player).unwrap().0;
        assert_eq!(carried, Vec2::ZERO);

        *world.get_mut::<DirectionalInput>(player).unwrap() = DirectionalInput::default();
        let motion = resolve_motion(170.0, DirectionalInput::default(), carried);
        assert_eq!(motion.pose, PoseSelection::Idle(None));

        scene.tick(&mut world);
        assert_eq!(world.get::<SpriteAnimator>(player).unwrap().frame(), 7);
        assert_eq!(world.get::<Velocity>(player).unwrap().0, Vec2::ZERO);
    }
}
