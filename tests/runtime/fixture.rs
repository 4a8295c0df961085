//! A core world with a second room, one item, and two connected players.

use std::sync::Arc;

use moorhen_foundation::{ClassId, ObjectId};
use moorhen_runtime::{
    BufferedConnection, CommandDispatcher, RuntimeConfig, ScriptHost, Session, core_world,
    spawn_player,
};
use moorhen_storage::{Database, World};

pub fn class(world: &World, name: &str) -> ClassId {
    world.class_by_name(name).map(|c| c.id).unwrap()
}

pub struct Player {
    pub id: ObjectId,
    pub conn: Arc<BufferedConnection>,
    pub session: Session,
}

impl Player {
    /// Sends one line and returns everything the player received.
    pub fn say(&mut self, dispatcher: &CommandDispatcher, line: &str) -> Vec<String> {
        dispatcher.handle(&mut self.session, line);
        self.conn.take_messages()
    }
}

pub struct Fixture {
    pub dispatcher: Arc<CommandDispatcher>,
    pub lobby: ObjectId,
    pub garden: ObjectId,
    pub north: ObjectId,
    pub lamp: ObjectId,
    pub ada: Player,
    pub bob: Player,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Handles: system #0, lobby #1, garden #2, north #3, lamp #4, Ada #5,
    /// Bob #6. Ada is a programmer, Bob is not.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let db = Database::new(99);
        let core = core_world(&db).unwrap();
        let lobby = core.start_room;
        let (garden, north, lamp) = db
            .transact(|w| {
                let (room, exit, item) = (class(w, "room"), class(w, "exit"), class(w, "item"));
                let garden = w.instantiate(room, None)?;
                w.set_property(garden, "name", "Garden")?;
                w.set_property(garden, "description", "Roses everywhere.")?;
                let north = w.instantiate(exit, Some(lobby))?;
                w.set_property(north, "name", "north")?;
                w.set_property(north, "destination", garden)?;
                let lamp = w.instantiate(item, Some(lobby))?;
                w.set_property(lamp, "name", "lamp")?;
                Ok((garden, north, lamp))
            })
            .unwrap();
        let ada = spawn_player(&db, "Ada", true).unwrap();
        let bob = spawn_player(&db, "Bob", false).unwrap();

        let host = Arc::new(ScriptHost::new(db, config));
        let dispatcher = Arc::new(CommandDispatcher::new(host));
        let connect = |id| {
            let conn = Arc::new(BufferedConnection::new());
            let session = dispatcher.connect(id, conn.clone());
            Player { id, conn, session }
        };
        let (ada, bob) = (connect(ada), connect(bob));
        Self {
            dispatcher,
            lobby,
            garden,
            north,
            lamp,
            ada,
            bob,
        }
    }

    pub fn database(&self) -> &Database {
        self.dispatcher.host().database()
    }

    pub fn ada(&mut self, line: &str) -> Vec<String> {
        self.ada.say(&self.dispatcher, line)
    }

    pub fn bob(&mut self, line: &str) -> Vec<String> {
        self.bob.say(&self.dispatcher, line)
    }
}
