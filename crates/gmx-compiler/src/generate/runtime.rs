//! Runtime scaffolding emitted verbatim into every generated program.
//!
//! The scaffolding only references names the generator always emits
//! (`routes`, `migrations`, `appTemplate`, `appStyle`, `componentTemplates`),
//! so it is a fixed text block rather than a template.

pub const HELPERS: &str = r#"// --- runtime scaffolding ---

// Ctx carries the per-request state every handler receives.
type Ctx struct {
	DB     *sql.DB
	Tenant string
	User   string
	W      http.ResponseWriter
	R      *http.Request
}

func withCtx(db *sql.DB, handler func(*Ctx)) http.HandlerFunc {
	return func(w http.ResponseWriter, r *http.Request) {
		ctx := &Ctx{
			DB:     db,
			Tenant: r.Header.Get("X-Tenant"),
			User:   r.Header.Get("X-User"),
			W:      w,
			R:      r,
		}
		handler(ctx)
	}
}

func openDatabase() *sql.DB {
	dsn := os.Getenv("DATABASE_URL")
	if dsn == "" {
		dsn = "app.db"
	}
	db, err := sql.Open("sqlite3", dsn)
	if err != nil {
		log.Fatalf("open database: %v", err)
	}
	return db
}

func runMigrations(db *sql.DB) {
	for _, stmt := range migrations {
		if _, err := db.Exec(stmt); err != nil {
			log.Fatalf("migration failed: %v", err)
		}
	}
}

func routeFor(name string) string {
	if path, ok := routes[name]; ok {
		return path
	}
	return "/"
}

func parseTemplates() *template.Template {
	root := template.New("app").Funcs(template.FuncMap{"route": routeFor})
	template.Must(root.Parse(appTemplate))
	for name, src := range componentTemplates {
		template.Must(root.New(name).Parse(src))
	}
	return root
}

func ensureCSRFCookie(w http.ResponseWriter, r *http.Request) string {
	if cookie, err := r.Cookie("csrf_token"); err == nil && cookie.Value != "" {
		return cookie.Value
	}
	buf := make([]byte, 16)
	if _, err := rand.Read(buf); err != nil {
		log.Fatalf("csrf token: %v", err)
	}
	token := hex.EncodeToString(buf)
	http.SetCookie(w, &http.Cookie{Name: "csrf_token", Value: token, Path: "/"})
	return token
}

func csrfMiddleware(next http.Handler) http.Handler {
	return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {
		switch r.Method {
		case http.MethodPost, http.MethodPut, http.MethodPatch, http.MethodDelete:
			token := r.Header.Get("X-CSRF-Token")
			if token == "" {
				token = r.FormValue("_csrf")
			}
			cookie, err := r.Cookie("csrf_token")
			if err != nil || cookie.Value == "" || token != cookie.Value {
				http.Error(w, "invalid CSRF token", http.StatusForbidden)
				return
			}
		}
		next.ServeHTTP(w, r)
	})
}

func serveIndex(tmpl *template.Template) http.HandlerFunc {
	return func(w http.ResponseWriter, r *http.Request) {
		data := map[string]any{
			"Style": appStyle,
			"CSRF":  ensureCSRFCookie(w, r),
		}
		if err := tmpl.Execute(w, data); err != nil {
			log.Printf("render: %v", err)
		}
	}
}

func listenAddr() string {
	if port := os.Getenv("PORT"); port != "" {
		return fmt.Sprintf(":%s", port)
	}
	return ":8080"
}

var emailPattern = regexp.MustCompile(`^[^@\s]+@[^@\s]+\.[^@\s]+$`)
"#;
